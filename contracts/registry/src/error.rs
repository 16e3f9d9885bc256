use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized: Sender {sender} does not hold the {role} role.")]
    Unauthorized { sender: String, role: String },

    #[error("NotNodeOwner: Sender {sender} is not authorized for node {node}.")]
    NotNodeOwner { sender: String, node: String },

    #[error("SubdomainExpired: Node {node} has no active owner.")]
    SubdomainExpired { node: String },

    #[error("TokenDoesNotExist: Node {node} was never created.")]
    TokenDoesNotExist { node: String },

    #[error("TransferFromIncorrectOwner: {from} is not the owner {owner}.")]
    TransferFromIncorrectOwner { from: String, owner: String },

    #[error("ExpiryInPast: Expiry {expiry} is not after current time {current}.")]
    ExpiryInPast { expiry: u64, current: u64 },

    #[error("InvalidLabel: {label:?}")]
    InvalidLabel { label: String },

    #[error("NodeAndLabelNotMatch")]
    NodeAndLabelNotMatch {},

    #[error("NameAndHashNotMatch")]
    NameAndHashNotMatch {},

    #[error("BytesFormatError")]
    BytesFormatError {},
}
