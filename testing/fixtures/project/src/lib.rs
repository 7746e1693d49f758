pub mod commands;

pub struct App {
    pub name: String,
}

pub trait Runner {
    fn run(&self);
}
