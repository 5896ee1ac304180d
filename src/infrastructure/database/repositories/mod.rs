pub mod author_repository;

pub use author_repository::SeaOrmAuthorRepository;
