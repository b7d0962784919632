//! Template compilation and composition through the public API.

use pagesmith::templating::{Compiler, Renderer, StaticPartials, TemplateError};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

fn compiler(partials: &[(&str, &str)]) -> Compiler {
    let pool = partials.iter().map(|(name, source)| (name.to_string(), source.to_string())).collect();
    Compiler::new(Arc::new(StaticPartials::with_builtins(pool)))
}

fn render(compiler: &Compiler, source: &str, data: &Value) -> String {
    compiler.compile(source).unwrap().render_to_string(data).unwrap()
}

#[test]
fn test_partial_reference_matches_inlined_source() {
    let partial = "<b>{{name}}</b>{{#each tags}}<i>{{this}}</i>{{/each}}";
    let compiler = compiler(&[("card", partial)]);
    let data = json!({
        "name": "Ada & co",
        "people": [
            {"name": "Grace", "tags": ["navy"]},
            {"name": "Alan", "tags": []},
        ],
        "tags": ["top"],
    });

    let cases = [
        ("<p>{{> card}}</p>", format!("<p>{partial}</p>")),
        ("{{#each people}}[{{> card}}]{{/each}}", format!("{{{{#each people}}}}[{partial}]{{{{/each}}}}")),
        ("{{#unless missing}}{{>card}}{{/unless}}", format!("{{{{#unless missing}}}}{partial}{{{{/unless}}}}")),
    ];

    for (with_reference, inlined) in cases {
        assert_eq!(
            render(&compiler, with_reference, &data),
            render(&compiler, &inlined, &data),
            "template: {with_reference}"
        );
    }
}

#[test]
fn test_partials_nest() {
    let compiler = compiler(&[("outer", "<div>{{> inner}}</div>"), ("inner", "{{title}}")]);
    let template = compiler.compile("{{> outer}}").unwrap();
    assert_eq!(template.render_to_string(&json!({"title": "x"})).unwrap(), "<div>x</div>");
    assert_eq!(template.partial_names(), ["inner".to_string(), "outer".to_string()]);
}

#[test]
fn test_partial_missing_deep_inside_a_block_fails_compilation() {
    let compiler = compiler(&[("list", "{{#each items}}{{#if this}}{{> item}}{{/if}}{{/each}}")]);
    let err = compiler.compile_named("page", "<ul>{{> list}}</ul>").unwrap_err();
    assert!(err.is_partial_not_found(), "unexpected error: {err}");
    assert!(err.to_string().contains("item"));
}

#[test]
fn test_unknown_partial_is_a_compile_error() {
    let compiler = compiler(&[]);
    let err = compiler.compile_named("page", "{{> nowhere}}").unwrap_err();
    assert!(err.is_partial_not_found(), "unexpected error: {err}");
}

#[test]
fn test_layout_composition_law() {
    let compiler = compiler(&[("row", "<tr>{{id}}</tr>")]);
    let template = Arc::new(compiler.compile("<table>{{#each rows}}{{> row}}{{/each}}</table>").unwrap());
    let layout = Arc::new(compiler.compile("<html><body>{{{content}}}</body></html>").unwrap());

    for data in [json!({"rows": [{"id": 1}, {"id": 2}]}), json!({"rows": []}), json!({})] {
        let composed = Renderer::layout(template.clone(), layout.clone()).render_to_vec(&data).unwrap();

        let fragment = template.render_to_string(&data).unwrap();
        let expected = layout.render_to_string(&json!({ "content": fragment })).unwrap();
        assert_eq!(String::from_utf8(composed).unwrap(), expected);
    }
}

#[test]
fn test_layout_reaches_page_fields() {
    let compiler = compiler(&[]);
    let template = Arc::new(compiler.compile("<h1>{{title}}</h1>").unwrap());
    let layout = Arc::new(compiler.compile("<title>{{title}}</title>{{{content}}}").unwrap());

    let html = Renderer::layout(template, layout).render_to_vec(&json!({"title": "Home"})).unwrap();
    assert_eq!(html, b"<title>Home</title><h1>Home</h1>");
}

#[test]
fn test_debug_partial_is_always_available() {
    let compiler = Compiler::new(Arc::new(StaticPartials::with_builtins(HashMap::new())));
    let html = render(&compiler, "{{#with user}}{{> pagesmith/debug}}{{/with}}", &json!({"user": {"id": 3}}));
    assert!(html.starts_with("<pre class=\"pagesmith-debug\">"), "got {html}");
    assert!(html.contains("{&quot;id&quot;:3}"), "debug output is escaped: {html}");
}

#[test]
fn test_batch_compile_reports_each_failure() {
    let compiler = compiler(&[]);
    let results = compiler.compile_batch([("ok", "{{a}}"), ("broken", "{{#each a}}"), ("missing", "{{> gone}}")]);

    assert!(results["ok"].is_ok());
    assert!(matches!(results["broken"], Err(TemplateError::Compile { .. })));
    assert!(results["missing"].as_ref().unwrap_err().is_partial_not_found());
}

#[test]
fn test_static_and_noop_renderers_ignore_data() {
    let data = json!({"anything": true});
    assert_eq!(Renderer::fixed(&b"fixed"[..]).render_to_vec(&data).unwrap(), b"fixed");
    assert!(Renderer::Noop.render_to_vec(&data).unwrap().is_empty());
}
