pub mod support;

mod registry_tests;
