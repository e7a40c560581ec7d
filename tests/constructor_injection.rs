//! Constructor injection: dependencies passed as constructor arguments.

#![deny(unreachable_code)]

mod common;

use beanbox::*;
use common::*;
use std::sync::Arc;

#[derive(Bean)]
#[bean(constructor = new)]
struct ReportService {
    #[inject(constructor)]
    repository: Arc<dyn UserRepository>,
    #[value("report.title", constructor)]
    title: String,
    #[inject(setter = attach_mailer)]
    mailer: Option<Arc<dyn Mailer>>,
    title_seen_by_setter: Option<String>,
}

impl ReportService {
    fn new(repository: Arc<dyn UserRepository>, title: String) -> Self {
        Self {
            repository,
            title,
            mailer: None,
            title_seen_by_setter: None,
        }
    }

    fn attach_mailer(&mut self, mailer: Arc<dyn Mailer>) {
        self.title_seen_by_setter = Some(self.title.clone());
        self.mailer = Some(mailer);
    }

    fn headline(&self, id: u32) -> String {
        let name = self.repository.find_name(id).unwrap_or_default();
        format!("{}: {}", self.title, name)
    }
}

// No named constructor: constructor members are set memberwise
#[derive(Bean)]
struct LookupService {
    #[inject(constructor)]
    repository: Arc<dyn UserRepository>,
    #[value("lookup.limit", constructor)]
    limit: Option<i64>,
    cache: Vec<String>,
}

#[derive(Bean, Default)]
struct Footer {
    #[value("report.footer")]
    text: Option<String>,
}

#[derive(Bean)]
#[bean(constructor = assemble)]
struct Document {
    #[inject(bean, constructor)]
    footer: Footer,
    #[inject(constructor)]
    mailer: Inject<dyn Mailer>,
}

impl Document {
    fn assemble(footer: Footer, mailer: Inject<dyn Mailer>) -> Self {
        Self { footer, mailer }
    }
}

#[test]
fn test_constructor_receives_value_in_position() {
    let provider = BeanInstanceProvider::new();
    provider.set_value("report.title", "Weekly".to_string());

    let service = provider.create_bean::<ReportService>().unwrap();
    assert_eq!(service.title, "Weekly");

    let repository = provider.get_instance_of::<dyn UserRepository>().unwrap();
    assert!(Arc::ptr_eq(&service.repository, &repository));
}

#[test]
fn test_constructor_runs_before_setters() {
    let provider = BeanInstanceProvider::new();
    provider.set_value("report.title", "Daily".to_string());

    let service = provider.create_bean::<ReportService>().unwrap();
    assert_eq!(service.title_seen_by_setter.as_deref(), Some("Daily"));
    assert!(service.mailer.is_some());
}

#[test]
fn test_constructor_with_registered_mock() {
    let provider = BeanInstanceProvider::new();
    provider.register_instance::<dyn UserRepository>(Arc::new(repository_returning(3, "grace")));
    provider.set_value("report.title", "Users".to_string());

    let service = provider.create_bean::<ReportService>().unwrap();
    assert_eq!(service.headline(3), "Users: grace");
}

#[test]
fn test_missing_constructor_value_fails() {
    let provider = BeanInstanceProvider::new();
    let err = provider.create_bean::<ReportService>().err().unwrap();

    assert!(matches!(
        err,
        Error::MissingValue { member: "title", ref key, .. } if key == "report.title"
    ));
}

#[test]
fn test_memberwise_construction() {
    let provider = BeanInstanceProvider::new();
    provider.set_value("lookup.limit", 100i64);

    let service = provider.create_bean::<LookupService>().unwrap();
    assert_eq!(service.limit, Some(100));
    assert!(service.cache.is_empty());

    let repository = provider.get_instance_of::<dyn UserRepository>().unwrap();
    assert!(Arc::ptr_eq(&service.repository, &repository));
}

#[test]
fn test_optional_constructor_value() {
    let provider = BeanInstanceProvider::new();
    let service = provider.create_bean::<LookupService>().unwrap();
    assert_eq!(service.limit, None);
}

#[test]
fn test_nested_bean_as_constructor_argument() {
    let provider = BeanInstanceProvider::new();
    provider.set_value("report.footer", "(c) Example".to_string());

    let document = provider.create_bean::<Document>().unwrap();
    assert_eq!(document.footer.text.as_deref(), Some("(c) Example"));
    assert!(document.mailer.is_injected());
}

#[test]
fn test_constructor_positions_follow_declaration_order() {
    let descriptor = descriptor_of::<ReportService>().unwrap();
    assert_eq!(descriptor.construction(), Construction::Constructor("new"));

    let points = descriptor.constructor_points();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].member(), "repository");
    assert_eq!(points[0].kind(), InjectionKind::Constructor { position: 0 });
    assert_eq!(points[1].member(), "title");
    assert_eq!(points[1].dependency().key(), Some("report.title"));
}
