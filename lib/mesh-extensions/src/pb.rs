pub mod extensions {
    pub mod v1 {
        include!("generated/extensions.v1.rs");
    }
}
