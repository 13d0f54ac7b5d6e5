pub mod ads1115;
