pub mod competitor_offer;
pub mod row;
pub mod tariff;
pub mod village_input;
pub mod wholesale_price;

pub use competitor_offer::{CompetitorOffer, Retailer, RetailerRate, UnknownRetailer};
pub use row::Row;
pub use tariff::Tariff;
pub use village_input::{Area, QuarterFigures, VillageInput};
pub use wholesale_price::WholesalePricePoint;
