// Error codes implementation
// Standardized error codes shared by every crate in the workspace

pub mod document {
    pub const FETCH_TIMEOUT: &str = "DOC_1001";
    pub const FORMAT_UNAVAILABLE: &str = "DOC_1002";
    pub const FETCH_EXHAUSTED: &str = "DOC_1003";
    pub const DECODE_FAILED: &str = "DOC_1004";
    pub const NETWORK: &str = "DOC_1005";
}

pub mod extraction {
    pub const INVALID_GRAMMAR: &str = "EXTRACT_2001";
    pub const NO_CANDIDATES: &str = "EXTRACT_2002";
}

pub mod workflow {
    pub const ELEMENT_WAIT_TIMEOUT: &str = "WORKFLOW_3001";
    pub const MAX_RETRIES_EXCEEDED: &str = "WORKFLOW_3002";
    pub const CANCELLED: &str = "WORKFLOW_3003";
    pub const CAPABILITY_UNAVAILABLE: &str = "WORKFLOW_3004";
    pub const HOST_ACTION_FAILED: &str = "WORKFLOW_3005";
    pub const INVALID_STATE: &str = "WORKFLOW_3006";
}

pub mod store {
    pub const READ_FAILED: &str = "STORE_4001";
    pub const WRITE_FAILED: &str = "STORE_4002";
    pub const CORRUPT_VALUE: &str = "STORE_4003";
}

pub mod config {
    pub const LOAD_FAILED: &str = "CONFIG_5001";
    pub const VALIDATION_FAILED: &str = "CONFIG_5002";
}

pub mod logging {
    pub const INIT_FAILED: &str = "LOG_6001";
}
