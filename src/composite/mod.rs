pub mod blend;
pub mod compositor;
pub mod layout;
pub mod shadow;
