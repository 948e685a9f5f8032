pub mod ippe;
