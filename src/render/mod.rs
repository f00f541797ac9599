mod layout;
mod renderer;

pub use renderer::Renderer;
