pub mod cash;
pub mod context;
pub mod gate;
pub mod identity;
pub mod instrument;
pub mod order;
pub mod position;
pub mod record;
