pub mod mappings;

pub use mappings::MappingsRepository;
