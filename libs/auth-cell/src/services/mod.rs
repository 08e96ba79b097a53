pub mod accounts;
pub mod password;
pub mod seed;

pub use accounts::AccountService;
pub use seed::seed_sample_doctors;
