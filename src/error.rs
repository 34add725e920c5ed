use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaysError {
    #[error("no wallet provider found")]
    WalletNotFound,

    #[error("wallet connection was rejected")]
    ConnectionRejected,

    #[error("contract not initialized")]
    ContractUninitialized,

    #[error("invalid contract address '{0}'")]
    InvalidContractAddress(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, SaysError>;

/// EIP-1193 "user rejected request".
pub const USER_REJECTED: i64 = 4001;

impl SaysError {
    /// Title and description for the toast raised when this error reaches the UI.
    pub fn notice(&self) -> (&'static str, String) {
        match self {
            SaysError::WalletNotFound => (
                "Wallet Not Found",
                "Please install or start a wallet to use this application.".to_string(),
            ),
            SaysError::ConnectionRejected => (
                "Connection Failed",
                "Failed to connect to your wallet. Please try again.".to_string(),
            ),
            SaysError::ContractUninitialized => (
                "Contract Error",
                "The contract is not initialized yet. Connect your wallet first.".to_string(),
            ),
            SaysError::InvalidContractAddress(addr) => (
                "Contract Error",
                format!("Failed to initialize the contract at '{}'.", addr),
            ),
            SaysError::TransactionFailed(reason) => ("Transaction Failed", reason.clone()),
            SaysError::ReadFailed(_) | SaysError::Decode(_) => (
                "Error",
                "Failed to fetch says. Please try again.".to_string(),
            ),
            SaysError::Rpc { message, .. } => ("Network Error", message.clone()),
            SaysError::Transport(e) => ("Network Error", e.to_string()),
        }
    }

    /// Re-tag a transport level failure as a failed read.
    pub fn into_read(self) -> SaysError {
        match self {
            SaysError::Rpc { .. } | SaysError::Transport(_) | SaysError::Decode(_) => {
                SaysError::ReadFailed(self.to_string())
            }
            other => other,
        }
    }

    /// Re-tag a transport level failure as a failed transaction.
    pub fn into_transaction(self) -> SaysError {
        match self {
            SaysError::Rpc { code, .. } if code == USER_REJECTED => {
                SaysError::TransactionFailed("rejected in wallet".to_string())
            }
            SaysError::Rpc { .. } | SaysError::Transport(_) | SaysError::Decode(_) => {
                SaysError::TransactionFailed(self.to_string())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_becomes_read_failure() {
        let err = SaysError::Rpc {
            code: -32000,
            message: "execution reverted".to_string(),
        }
        .into_read();
        assert!(matches!(err, SaysError::ReadFailed(_)));
    }

    #[test]
    fn test_user_rejection_becomes_transaction_failure() {
        let err = SaysError::Rpc {
            code: USER_REJECTED,
            message: "User denied".to_string(),
        }
        .into_transaction();
        match err {
            SaysError::TransactionFailed(reason) => assert_eq!(reason, "rejected in wallet"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_uninitialized_is_untouched() {
        assert!(matches!(
            SaysError::ContractUninitialized.into_transaction(),
            SaysError::ContractUninitialized
        ));
    }
}
