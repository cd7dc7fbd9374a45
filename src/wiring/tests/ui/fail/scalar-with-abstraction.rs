use wiring::component;

pub struct Mailer;

#[component]
impl Mailer {
    #[inject]
    pub fn new(#[scalar] #[abstraction("Host")] host: String) -> Self {
        let _ = host;
        Self
    }
}

fn main() {
    let _ = Mailer;
}
