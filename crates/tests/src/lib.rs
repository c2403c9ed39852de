pub mod fixtures;

#[cfg(test)]
mod analyze_tests;
#[cfg(test)]
mod session_tests;
