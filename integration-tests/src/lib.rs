//! Integration tests package lib
#![allow(dead_code)]

mod utils;


#[cfg(test)]
mod cancellation_test;

#[cfg(test)]
mod deposit_settings_test;
