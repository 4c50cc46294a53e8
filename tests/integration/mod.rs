/// Plans and scripts generated from realistic snapshot pairs
pub mod round_trip;
pub mod scripts;
