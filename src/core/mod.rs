pub mod catalog;
pub mod debounce;
pub mod detail;
pub mod favorites;
pub mod tmdb;
pub mod trending;
