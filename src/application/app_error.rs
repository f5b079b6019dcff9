use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Subscription plan not found")]
    PlanNotFound,

    #[error("Invoice not found")]
    InvoiceNotFound,

    #[error("Customer with this email already exists")]
    EmailTaken,

    #[error("Plan with the same name already exists")]
    PlanNameTaken,

    #[error("Invoice already paid")]
    AlreadyPaid,

    #[error("Invoice already generated for this cycle")]
    AlreadyGenerated,

    #[error("Subscription is cancelled")]
    SubscriptionCancelled,

    #[error("Incorrect payment amount: expected {expected}, got {got}")]
    AmountMismatch { expected: i64, got: i64 },

    #[error("Subscription plan already active")]
    SamePlan,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification callers use to decide how to surface an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    Dependency,
    Internal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    CustomerNotFound,
    PlanNotFound,
    InvoiceNotFound,
    EmailTaken,
    PlanNameTaken,
    AlreadyPaid,
    AlreadyGenerated,
    SubscriptionCancelled,
    AmountMismatch,
    SamePlan,
    InvalidInput,
    StoreUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            ErrorCode::PlanNotFound => "PLAN_NOT_FOUND",
            ErrorCode::InvoiceNotFound => "INVOICE_NOT_FOUND",
            ErrorCode::EmailTaken => "EMAIL_TAKEN",
            ErrorCode::PlanNameTaken => "PLAN_NAME_TAKEN",
            ErrorCode::AlreadyPaid => "ALREADY_PAID",
            ErrorCode::AlreadyGenerated => "ALREADY_GENERATED",
            ErrorCode::SubscriptionCancelled => "SUBSCRIPTION_CANCELLED",
            ErrorCode::AmountMismatch => "AMOUNT_MISMATCH",
            ErrorCode::SamePlan => "SAME_PLAN",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::CustomerNotFound | AppError::PlanNotFound | AppError::InvoiceNotFound => {
                ErrorKind::NotFound
            }
            AppError::EmailTaken
            | AppError::PlanNameTaken
            | AppError::AlreadyPaid
            | AppError::AlreadyGenerated
            | AppError::SubscriptionCancelled => ErrorKind::Conflict,
            AppError::AmountMismatch { .. } | AppError::SamePlan | AppError::InvalidInput(_) => {
                ErrorKind::InvalidInput
            }
            AppError::Store(_) => ErrorKind::Dependency,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::CustomerNotFound => ErrorCode::CustomerNotFound,
            AppError::PlanNotFound => ErrorCode::PlanNotFound,
            AppError::InvoiceNotFound => ErrorCode::InvoiceNotFound,
            AppError::EmailTaken => ErrorCode::EmailTaken,
            AppError::PlanNameTaken => ErrorCode::PlanNameTaken,
            AppError::AlreadyPaid => ErrorCode::AlreadyPaid,
            AppError::AlreadyGenerated => ErrorCode::AlreadyGenerated,
            AppError::SubscriptionCancelled => ErrorCode::SubscriptionCancelled,
            AppError::AmountMismatch { .. } => ErrorCode::AmountMismatch,
            AppError::SamePlan => ErrorCode::SamePlan,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::Store(_) => ErrorCode::StoreUnavailable,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
