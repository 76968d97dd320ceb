// Infrastructure layer module
// Storage adapters for the domain's Store/UnitOfWork contract

pub mod repositories;
