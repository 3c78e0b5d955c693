pub mod country_message;
pub mod geolocation;
pub mod init;
pub mod world_foi_websites;
