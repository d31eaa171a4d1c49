pub mod feature_group;
