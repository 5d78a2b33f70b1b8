mod credit_repository;
mod profile_repository;

pub use credit_repository::CreditRepository;
pub use profile_repository::ProfileRepository;
