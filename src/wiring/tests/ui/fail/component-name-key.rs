use wiring::component;

pub struct Mailer;

#[component(label = "mailer")]
impl Mailer {
    #[inject]
    pub fn new() -> Self {
        Self
    }
}

fn main() {
    let _ = Mailer;
}
