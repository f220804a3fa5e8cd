pub mod deck;
pub mod pages;
pub mod status;

