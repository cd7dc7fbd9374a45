use wiring::component;

pub struct Mailer;

#[component]
impl Mailer {
    #[inject]
    pub fn new(#[default(1)] #[default(2)] retries: u32) -> Self {
        let _ = retries;
        Self
    }
}

fn main() {
    let _ = Mailer;
}
