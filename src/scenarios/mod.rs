//! Rule sets bundled with the simenv binary

pub mod temperature;
