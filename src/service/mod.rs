//! CrudService: generic CRUD over any record store.

mod crud;
mod validation;
pub use crud::CrudService;
pub use validation::PayloadValidator;
