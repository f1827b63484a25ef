pub mod catalog;
pub mod cities;
pub mod company;
pub mod linkings;
pub mod login;
pub mod users;
