// src/utils/constants.rs

/// Default similarity cutoff for Top→SFDC candidate acceptance.
pub const DEFAULT_TOP_SFDC_THRESHOLD: f64 = 0.85;
/// Default similarity cutoff for SFDC→SAP candidate acceptance.
pub const DEFAULT_SFDC_SAP_THRESHOLD: f64 = 0.85;

/// Header row (0-based) of the Top spreadsheet.
pub const DEFAULT_TOP_HEADER_ROW: usize = 2;
pub const DEFAULT_TOP_COLUMN: &str = "End Customer";

// Address component weights. They sum to 1.0.
pub const STREET_WEIGHT: f64 = 0.4;
pub const PLACE_WEIGHT: f64 = 0.3;
pub const STATE_WEIGHT: f64 = 0.2;
pub const POSTAL_WEIGHT: f64 = 0.1;

/// Decimal places kept for name and address scores.
pub const SCORE_PLACES: usize = 3;
/// Decimal places kept for the composite Stage1 score.
pub const COMPOSITE_SCORE_PLACES: usize = 5;

pub const ADDRESS_NOT_NEEDED: &str = "address match not needed";
pub const ADDRESS_NOT_EVALUATED: &str = "address not evaluated";

/// Second strings shorter than this never have frequent characters dropped
/// from the similarity ratio's match index.
pub const AUTOJUNK_MIN_LEN: usize = 200;

pub const DEFAULT_SFDC_ID_COLUMN: &str = "Account ID";
pub const DEFAULT_SFDC_NAME_COLUMN: &str = "Account Name";
pub const DEFAULT_SFDC_WEBSITE_COLUMN: &str = "Website";
pub const DEFAULT_SFDC_STREET_COLUMN: &str = "Billing Street";
pub const DEFAULT_SFDC_STATE_COLUMN: &str = "Billing State/Province";
pub const DEFAULT_SFDC_PARENT_COLUMN: &str = "Parent Account";

pub const DEFAULT_SAP_CUSTOMER_COLUMN: &str = "Customer";
pub const DEFAULT_SAP_NAME1_COLUMN: &str = "Name 1";
pub const DEFAULT_SAP_NAME2_COLUMN: &str = "Name 2";
pub const DEFAULT_SAP_STREET_COLUMN: &str = "Street";
pub const DEFAULT_SAP_CITY_COLUMN: &str = "City";
pub const DEFAULT_SAP_REGION_COLUMN: &str = "Rg";
pub const DEFAULT_SAP_POSTAL_COLUMN: &str = "PostalCode";
