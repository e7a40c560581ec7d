// Collaborators shared by the injection test suites
#![allow(dead_code)]

use mockall::automock;

#[automock]
pub trait UserRepository: Send + Sync {
    fn find_name(&self, id: u32) -> Option<String>;
}

#[automock]
pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, body: &str) -> bool;
}

/// No mock factory is registered for this one.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

beanbox::register_mock!(dyn UserRepository => MockUserRepository::new());
beanbox::register_mock!(dyn Mailer => MockMailer::new());

pub fn repository_returning(id: u32, name: &'static str) -> MockUserRepository {
    let mut repository = MockUserRepository::new();
    repository
        .expect_find_name()
        .withf(move |requested| *requested == id)
        .returning(move |_| Some(name.to_string()));
    repository
}
