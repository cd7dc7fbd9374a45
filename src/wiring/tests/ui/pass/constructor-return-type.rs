use std::convert::Infallible;

use wiring::prelude::*;

pub struct Test1;

#[component]
impl Test1 {
    #[inject]
    pub fn new() -> Self {
        Self
    }
}

pub struct Test2;

#[component]
impl Test2 {
    #[inject]
    pub fn new() -> Test2 {
        Test2
    }
}

pub struct Test3;

#[component]
impl Test3 {
    #[inject]
    pub fn new() -> Result<Self, Infallible> {
        Ok(Self)
    }
}

pub struct Test4;

#[component]
impl Test4 {
    #[inject]
    pub fn new() -> Result<Test4, &'static str> {
        Ok(Test4)
    }
}

pub struct Test5;

#[component]
impl Test5 {
    #[inject]
    pub fn new() -> std::result::Result<Test5, Infallible> {
        Ok(Test5)
    }
}

fn main() {
    assert_eq!(<Test1 as Constructible>::NAME, "Test1");
    assert!(<Test3 as Constructible>::parameters().is_empty());
}
