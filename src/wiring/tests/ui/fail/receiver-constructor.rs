use wiring::component;

pub struct Mailer;

#[component]
impl Mailer {
    #[inject]
    pub fn new(self) -> Self {
        self
    }
}

fn main() {
    let _ = Mailer;
}
