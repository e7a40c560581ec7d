use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, DeriveInput, Error, Fields, GenericArgument, Ident, LitStr, PathArguments, Token,
    Type,
    ext::IdentExt,
    parse::{Parse, ParseStream},
    parse_macro_input,
    spanned::Spanned,
};

/// How the member receives its dependency.
enum Style {
    Field,
    Setter(Ident),
    Constructor,
}

enum Source {
    Instance(Type),
    Value { key: LitStr, optional: Option<Type> },
    Bean,
}

struct Point {
    member: Ident,
    ty: Type,
    style: Style,
    source: Source,
}

#[derive(Default)]
struct BeanArgs {
    constructor: Option<Ident>,
    is_abstract: bool,
    context_aware: bool,
}

/// Shared tail of `#[inject(..)]` and `#[value("key", ..)]`
#[derive(Default)]
struct StyleArgs {
    setter: Option<Ident>,
    constructor: bool,
    bean: bool,
}

impl StyleArgs {
    fn parse_items(input: ParseStream, allow_bean: bool) -> syn::Result<Self> {
        let mut args = StyleArgs::default();

        while !input.is_empty() {
            let key = input.call(Ident::parse_any)?;
            match key.to_string().as_str() {
                "setter" => {
                    input.parse::<Token![=]>()?;
                    args.setter = Some(input.parse()?);
                }
                "constructor" => args.constructor = true,
                "bean" if allow_bean => args.bean = true,
                other => {
                    return Err(Error::new(key.span(), format!("unknown option `{other}`")));
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        if args.setter.is_some() && args.constructor {
            return Err(input.error("`setter` and `constructor` cannot be combined"));
        }

        Ok(args)
    }

    fn style(self) -> Style {
        match (self.setter, self.constructor) {
            (Some(setter), _) => Style::Setter(setter),
            (None, true) => Style::Constructor,
            (None, false) => Style::Field,
        }
    }
}

struct InjectArgs(StyleArgs);

impl Parse for InjectArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        StyleArgs::parse_items(input, true).map(InjectArgs)
    }
}

struct ValueArgs {
    key: LitStr,
    style: StyleArgs,
}

impl Parse for ValueArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: LitStr = input.parse()?;
        if key.value().is_empty() {
            return Err(Error::new(key.span(), "value key cannot be empty"));
        }

        if !input.is_empty() {
            input.parse::<Token![,]>()?;
        }

        let style = StyleArgs::parse_items(input, false)?;
        Ok(ValueArgs { key, style })
    }
}

fn parse_bean_args(attrs: &[Attribute]) -> syn::Result<BeanArgs> {
    let mut args = BeanArgs::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("bean")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("constructor") {
                args.constructor = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("abstract") {
                args.is_abstract = true;
            } else if meta.path.is_ident("context_aware") {
                args.context_aware = true;
            } else {
                return Err(meta.error("expected `constructor`, `abstract` or `context_aware`"));
            }
            Ok(())
        })?;
    }

    if args.is_abstract && args.constructor.is_some() {
        return Err(Error::new(
            proc_macro2::Span::call_site(),
            "an abstract bean cannot name a constructor",
        ));
    }

    Ok(args)
}

/// Last path segment of `ty` when it is `Name<Inner>`.
fn single_generic<'a>(ty: &'a Type, names: &[&str]) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if !names.iter().any(|name| segment.ident == *name) {
        return None;
    }

    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// `T` of an `Inject<T>`, `Arc<T>` or `Option<Arc<T>>` member.
fn instance_type(ty: &Type) -> Option<&Type> {
    single_generic(ty, &["Inject", "Arc"])
        .or_else(|| single_generic(ty, &["Option"]).and_then(|inner| single_generic(inner, &["Arc"])))
}

fn parse_point(field: &syn::Field) -> syn::Result<Option<Point>> {
    let Some(member) = field.ident.clone() else {
        return Ok(None);
    };
    let ty = field.ty.clone();

    let inject = field.attrs.iter().find(|a| a.path().is_ident("inject"));
    let value = field.attrs.iter().find(|a| a.path().is_ident("value"));

    match (inject, value) {
        (Some(attr), Some(_)) => Err(Error::new(
            attr.span(),
            "a member takes either `#[inject]` or `#[value]`, not both",
        )),
        (Some(attr), None) => {
            let args = match &attr.meta {
                syn::Meta::Path(_) => StyleArgs::default(),
                _ => attr.parse_args::<InjectArgs>()?.0,
            };

            let source = if args.bean {
                Source::Bean
            } else {
                let inner = instance_type(&ty).ok_or_else(|| {
                    Error::new(
                        ty.span(),
                        "injected members must be `Inject<T>`, `Arc<T>` or `Option<Arc<T>>`",
                    )
                })?;
                Source::Instance(inner.clone())
            };

            Ok(Some(Point {
                member,
                ty,
                style: args.style(),
                source,
            }))
        }
        (None, Some(attr)) => {
            let args = attr.parse_args::<ValueArgs>()?;
            let optional = single_generic(&ty, &["Option"]).cloned();

            Ok(Some(Point {
                member,
                ty,
                style: args.style.style(),
                source: Source::Value {
                    key: args.key,
                    optional,
                },
            }))
        }
        (None, None) => Ok(None),
    }
}

fn dependency_tokens(point: &Point) -> TokenStream2 {
    let ty = &point.ty;
    match &point.source {
        Source::Instance(inner) => quote! { ::beanbox::Dependency::instance::<#inner>() },
        Source::Value {
            key,
            optional: Some(inner),
        } => quote! { ::beanbox::Dependency::optional_value::<#inner>(#key) },
        Source::Value { key, optional: None } => {
            quote! { ::beanbox::Dependency::value::<#ty>(#key) }
        }
        Source::Bean => quote! { ::beanbox::Dependency::bean::<#ty>() },
    }
}

/// Type the resolved box holds for this point.
fn resolved_type(point: &Point) -> TokenStream2 {
    match &point.source {
        Source::Instance(inner) => quote! { ::std::sync::Arc<#inner> },
        _ => {
            let ty = &point.ty;
            quote! { #ty }
        }
    }
}

/// Convert the unpacked value into what the member expects.
fn convert(point: &Point, value: TokenStream2) -> TokenStream2 {
    match point.source {
        Source::Instance(_) => quote! { ::core::convert::From::from(#value) },
        _ => value,
    }
}

pub fn bean_derive_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let syn::Data::Struct(data) = &input.data else {
        return Err(Error::new(input.span(), "`Bean` can only be derived for structs"));
    };

    let args = parse_bean_args(&input.attrs)?;

    let (points, members): (Vec<Point>, Vec<Ident>) = match &data.fields {
        Fields::Named(fields) => {
            let mut points = Vec::new();
            for field in &fields.named {
                if let Some(point) = parse_point(field)? {
                    points.push(point);
                }
            }
            let members = fields.named.iter().filter_map(|f| f.ident.clone()).collect();
            (points, members)
        }
        Fields::Unit => (Vec::new(), Vec::new()),
        Fields::Unnamed(fields) => {
            return Err(Error::new(
                fields.span(),
                "`Bean` needs named fields to describe injection points",
            ));
        }
    };

    if args.context_aware {
        if let Some(point) = points.iter().find(|p| p.member == "context") {
            return Err(Error::new(
                point.member.span(),
                "`context` is reserved for the context point of a `context_aware` bean",
            ));
        }
    }

    if args.is_abstract && points.iter().any(|p| matches!(p.style, Style::Constructor)) {
        return Err(Error::new(
            struct_name.span(),
            "an abstract bean cannot declare constructor parameters",
        ));
    }

    // Descriptor
    let mut position = 0usize;
    let mut descriptor_points = Vec::new();
    for point in &points {
        let member = point.member.to_string();
        let kind = match &point.style {
            Style::Field => quote! { ::beanbox::InjectionKind::Field },
            Style::Setter(method) => {
                let method = method.to_string();
                quote! { ::beanbox::InjectionKind::Setter { method: #method } }
            }
            Style::Constructor => {
                let kind = quote! {
                    ::beanbox::InjectionKind::Constructor { position: #position }
                };
                position += 1;
                kind
            }
        };
        let dependency = dependency_tokens(point);
        descriptor_points.push(quote! {
            .with_point(::beanbox::InjectionPoint::new(#member, #kind, #dependency))
        });
    }

    if args.context_aware {
        descriptor_points.push(quote! {
            .with_point(::beanbox::InjectionPoint::new(
                "context",
                ::beanbox::InjectionKind::Setter { method: "set_context" },
                ::beanbox::Dependency::context(),
            ))
        });
    }

    let construction = match (&args.constructor, args.is_abstract) {
        (_, true) => quote! { ::beanbox::Construction::Abstract },
        (Some(constructor), false) => {
            let name = constructor.to_string();
            quote! { ::beanbox::Construction::Constructor(#name) }
        }
        (None, false) => quote! { ::beanbox::Construction::Default },
    };

    // Construction
    let constructor_values: Vec<(&Ident, TokenStream2)> = points
        .iter()
        .filter(|p| matches!(p.style, Style::Constructor))
        .map(|point| {
            let member = point.member.to_string();
            let resolved = resolved_type(point);
            let taken = quote! { args.take::<#resolved>(#member)? };
            (&point.member, convert(point, taken))
        })
        .collect();

    let construct_body = if args.is_abstract {
        quote! {
            Err(::beanbox::Error::InvalidTarget {
                type_name: ::std::any::type_name::<Self>(),
                reason: "type is not instantiable".to_string(),
            })
        }
    } else if let Some(constructor) = &args.constructor {
        let values = constructor_values.iter().map(|(_, value)| value);
        quote! { Ok(Self::#constructor(#(#values),*)) }
    } else if matches!(data.fields, Fields::Unit) {
        quote! { Ok(Self) }
    } else {
        let inits = members.iter().map(|member| {
            match constructor_values.iter().find(|(name, _)| *name == member) {
                Some((_, value)) => quote! { #member: #value },
                None => quote! { #member: ::core::default::Default::default() },
            }
        });
        quote! { Ok(Self { #(#inits),* }) }
    };

    // Member injection
    let mut arms: Vec<TokenStream2> = points
        .iter()
        .filter(|p| !matches!(p.style, Style::Constructor))
        .map(|point| {
            let member = &point.member;
            let name = member.to_string();
            let resolved = resolved_type(point);
            let unpacked = quote! { point.unpack::<#resolved>(owner, value)? };
            match &point.style {
                Style::Setter(method) => quote! {
                    #name => {
                        self.#method(#unpacked);
                        Ok(())
                    }
                },
                _ => {
                    let value = convert(point, unpacked);
                    quote! {
                        #name => {
                            self.#member = #value;
                            Ok(())
                        }
                    }
                }
            }
        })
        .collect();

    if args.context_aware {
        arms.push(quote! {
            "context" => {
                ::beanbox::ContextAware::set_context(
                    self,
                    point.unpack::<::beanbox::BeanContext>(owner, value)?,
                );
                Ok(())
            }
        });
    }

    let expanded = quote! {
        impl #impl_generics ::beanbox::Bean for #struct_name #ty_generics #where_clause {
            fn descriptor() -> ::beanbox::BeanDescriptor {
                ::beanbox::BeanDescriptor::new::<Self>(#construction)
                    #(#descriptor_points)*
            }

            #[allow(unused_mut, unused_variables)]
            fn construct(
                mut args: ::beanbox::Arguments,
            ) -> ::beanbox::Result<Self> {
                #construct_body
            }

            #[allow(unused_variables)]
            fn inject(
                &mut self,
                point: &::beanbox::InjectionPoint,
                value: ::beanbox::Resolved,
            ) -> ::beanbox::Result<()> {
                let owner = ::std::any::type_name::<Self>();
                match point.member() {
                    #(#arms)*
                    _ => Err(::beanbox::Error::InjectionAccess {
                        type_name: owner,
                        member: point.member(),
                        reason: "not an injectable member".to_string(),
                    }),
                }
            }
        }
    };

    Ok(expanded)
}
