use chrono::{DateTime, Utc};
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

// ============ SCHEDULING MODELS ============

/// A transfer as the user typed it: recipient, send time (RFC 3339) and
/// amount in ether.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleTransferRequest {
    pub recipient: String,
    pub send_at: String,
    pub amount_eth: String,
}

/// A transfer that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransfer {
    pub recipient: Address,
    pub send_at: DateTime<Utc>,
    pub amount_wei: U256,
}

/// Unix seconds, the unit the sender contract compares against
/// `block.timestamp`. Times before the epoch clamp to zero.
pub fn unix_seconds(at: &DateTime<Utc>) -> U256 {
    U256::from(u64::try_from(at.timestamp()).unwrap_or(0))
}

impl ValidatedTransfer {
    pub fn send_at_unix(&self) -> U256 {
        unix_seconds(&self.send_at)
    }
}

/// A transfer the registry accepted
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledTransfer {
    /// Registry request id, when the receipt carried a `HashedReqAdded` event
    pub request_id: Option<U256>,
    pub request_hash: Option<H256>,
    pub transaction_hash: H256,
    pub block_number: u64,
    pub call_data: Bytes,
    pub value_sent: U256,
}
