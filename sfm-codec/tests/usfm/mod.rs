//! USFM (inline dialect) tests

mod back_translation;
mod round_trip;
