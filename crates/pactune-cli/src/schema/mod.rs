pub mod tuned_model;
