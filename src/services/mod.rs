pub mod booking;
pub mod codes;
pub mod fees;
pub mod notify;
pub mod scheduling;
