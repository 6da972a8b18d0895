//! Toolbox (stand-alone dialect) tests

mod round_trip;
