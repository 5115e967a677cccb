pub mod balam;
