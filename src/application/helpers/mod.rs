pub mod billing_period;
pub mod plan_resolver;
