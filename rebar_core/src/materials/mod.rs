//! # Materials Database
//!
//! Reinforcing steel and concrete properties used by the design engine.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::materials::{bar_area_cm2, unit_weight};
//!
//! let area = bar_area_cm2(20);
//! let weight = unit_weight(20);
//! println!("D20: {:.2} cm², {:.3} kg/m", area, weight.value());
//! ```

pub mod rebar;

pub use rebar::{
    bar_area, bar_area_cm2, bar_label, bars_area_cm2, lap_length, size_index, unit_weight,
    ConcreteGrade, SteelGrade, STANDARD_DIAMETERS_MM,
};
