pub mod customer;
pub mod date_key;
pub mod invoice;
pub mod payment;
pub mod subscription_plan;
