use std::error::Error;
use std::sync::Arc;

use wiring::prelude::*;

fn main() {
    let injector = Injector::init(AppModule::new("greeter")).unwrap();
    let app = injector.make_as::<App>("App", Params::new()).unwrap();
    app.run();
}

struct AppModule {
    app_name: &'static str,
}

impl AppModule {
    fn new(app_name: &'static str) -> Self {
        Self { app_name }
    }
}

impl Module for AppModule {
    fn configure(&self, injector: &Injector) -> Result<(), Box<dyn Error + Send + Sync>> {
        injector
            .register::<ConsoleLogger>()
            .register::<EnglishGreeter>()
            .register::<ChineseGreeter>()
            .register::<App>()
            .register_interface::<dyn Logger>()
            .register_interface::<dyn Greeter>();

        injector
            .bind("$app_name", Concrete::value(self.app_name), false)
            .singleton("Logger", "ConsoleLogger")
            .bind("Greeter", "EnglishGreeter", false)
            .singleton("App", "App");

        injector.when("App").bind("farewell", "ChineseGreeter", false);

        Ok(())
    }
}

trait Logger: Send + Sync + 'static {
    fn log(&self, message: &str);
}

struct ConsoleLogger {
    app_name: &'static str,
}

#[component]
impl ConsoleLogger {
    #[inject]
    pub fn new(app_name: &'static str) -> Self {
        Self { app_name }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        eprintln!("[{}] {}", self.app_name, message);
    }
}

trait Greeter: Send + Sync + 'static {
    fn greet(&self);
}

struct EnglishGreeter {
    logger: Arc<dyn Logger>,
}

#[component]
impl EnglishGreeter {
    #[inject]
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Greeter for EnglishGreeter {
    fn greet(&self) {
        self.logger.log("Hello World!");
    }
}

struct ChineseGreeter {
    logger: Arc<dyn Logger>,
}

#[component]
impl ChineseGreeter {
    #[inject]
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Greeter for ChineseGreeter {
    fn greet(&self) {
        self.logger.log("你好世界!");
    }
}

interface!(Logger = [ConsoleLogger]);
interface!(Greeter = [EnglishGreeter, ChineseGreeter]);

struct App {
    logger: Arc<dyn Logger>,
    greeter: Arc<dyn Greeter>,
    farewell: Arc<dyn Greeter>,
}

#[component]
impl App {
    #[inject]
    fn new(
        logger: Arc<dyn Logger>,
        greeter: Arc<dyn Greeter>,
        #[abstraction("farewell")] farewell: Arc<dyn Greeter>,
    ) -> Self {
        Self {
            logger,
            greeter,
            farewell,
        }
    }

    fn run(&self) {
        self.logger.log("Greeting from wiring managed objects:");
        self.greeter.greet();
        self.farewell.greet();
    }
}
