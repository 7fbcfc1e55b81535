pub mod db;
pub mod endpoints;
pub mod live_data;
pub mod odds;
pub mod params;
pub mod research;
