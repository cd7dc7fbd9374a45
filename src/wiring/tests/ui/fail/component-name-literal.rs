use wiring::component;

pub struct Mailer;

#[component(name = 42)]
impl Mailer {
    #[inject]
    pub fn new() -> Self {
        Self
    }
}

fn main() {
    let _ = Mailer;
}
