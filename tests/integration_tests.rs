// tests/integration_tests.rs

use graphquery::cli::{self, CheckOptions, CheckResult, CliError};
use graphquery::output::{to_json, to_json_pretty};
use graphquery::{compile, parse_from_str, PipelineError, Registry, Response, SelectionRef};
use serde::Deserialize;
use serde_json::json;

fn query(document: &str, expression: &str) -> String {
    to_json(&parse_from_str(document, expression))
}

/// Joins expression lines the way a Windows editor would save them.
fn crlf(lines: &[&str]) -> String {
    lines.join("\r\n")
}

const ITEMS: &str = r#"
    <html><body>
        <div class="item">
            <div class="title">title A</div>
            <div class="author">author A</div>
        </div>
        <div class="item">
            <div class="title">title B</div>
            <div class="author">author B</div>
        </div>
        <div class="item">
            <div class="title">title C</div>
            <div class="author">author C</div>
        </div>
    </body></html>
"#;

const ARTICLE: &str = r#"
    <html><body>
        <div class="title">Article</div>
        <div class="tags">
            <div class="tag">tag0</div>
            <div class="tag">tag1</div>
            <div class="tag">tag2</div>
        </div>
    </body></html>
"#;

const GRID: &str = r#"
    <html><body>
        <div class="items">
            <div class="item">
                <div class="pos">1.0</div>
                <div class="pos">1.1</div>
                <div class="pos">1.2</div>
            </div>
            <div class="item">
                <div class="pos">2.0</div>
                <div class="pos">2.1</div>
                <div class="pos">2.2</div>
            </div>
            <div class="item">
                <div class="pos">3.0</div>
                <div class="pos">3.1</div>
                <div class="pos">3.2</div>
            </div>
        </div>
    </body></html>
"#;

const PAGES: &str = r#"
    <html>
        <body>
            <a href="01.html">Page 1</a>
            <a href="02.html">Page 2</a>
            <a href="03.html">Page 3</a>
        </body>
    </html>
"#;

const LIBRARY: &str = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <meta charset="utf-8" />
        <meta http-equiv="X-UA-Compatible" content="IE=edge">
        <title>Test Title</title>
        <meta name="viewport" content="width=device-width, initial-scale=1">
        <script>
            var data = {
                "name": {
                    "first": "Tom",
                    "last": "Anderson"
                },
                "age": 37,
                "children": ["Sara", "Alex", "Jack"],
                "fav.movie": "Deer Hunter",
                "friends": [{
                        "first": "Dale",
                        "last": "Murphy",
                        "age": 44
                    },
                    {
                        "first": "Roger",
                        "last": "Craig",
                        "age": 68
                    },
                    {
                        "first": "Jane",
                        "last": "Murphy",
                        "age": 47
                    }
                ]
            }
        </script>
    </head>
    <body>
        <library>
            <!-- Great book. -->
            <book id="b0836217462" available="true">
                <isbn>0836217462</isbn>
                <title lang="en">Being a Dog Is a Full-Time Job</title>
                <quote>I'd dog paddle the deepest ocean.</quote>
                <author id="CMS">
                    <?echo "go rocks"?>
                        <name>Charles M Schulz</name>
                        <born>1922-11-26</born>
                        <dead>2000-02-12</dead>
                </author>
                <character id="PP">
                    <name>Peppermint Patty</name>
                    <born>1966-08-22</born>
                    <qualification>bold, brash and tomboyish</qualification>
                </character>
                <character id="Snoopy">
                    <name>Snoopy</name>
                    <born>1950-10-04</born>
                    <qualification>extroverted beagle</qualification>
                </character>
                <name>Harry Poter</name>
            </book>
        </library>
    </body>
    </html>
"#;

// ============================================================================
// Documents
// ============================================================================

#[test]
fn test_object_array_across_lines() {
    let expression = crlf(&[
        "item `css(\".item\")` [",
        "    {",
        "        title `css(\".title\")`",
        "        author `css(\".author\")`",
        "    }",
        "]",
    ]);
    assert_eq!(
        query(ITEMS, &expression),
        r#"{"data":[{"author":"author A","title":"title A"},{"author":"author B","title":"title B"},{"author":"author C","title":"title C"}],"errors":[]}"#
    );
}

#[test]
fn test_atom_string() {
    assert_eq!(
        query(ARTICLE, "title `css(\".title\")`"),
        r#"{"data":"Article","errors":[]}"#
    );
}

#[test]
fn test_object_with_array() {
    let expression = crlf(&[
        "{",
        "    title `css(\".title\")`",
        "    tags `css(\".tag\")` [",
        "        tag `text()`",
        "    ]",
        "}",
    ]);
    assert_eq!(
        query(ARTICLE, &expression),
        r#"{"data":{"tags":["tag0","tag1","tag2"],"title":"Article"},"errors":[]}"#
    );
}

#[test]
fn test_nested_arrays() {
    let expression = crlf(&[
        "items `css(\".item\")` [",
        "    item `css(\".pos\")` [",
        "        pos `text()`",
        "    ]",
        "]",
    ]);
    assert_eq!(
        query(GRID, &expression),
        r#"{"data":[["1.0","1.1","1.2"],["2.0","2.1","2.2"],["3.0","3.1","3.2"]],"errors":[]}"#
    );
}

#[test]
fn test_flat_array() {
    let expression = crlf(&["item `css(\".pos\")` [", "    pos `text()`", "]"]);
    assert_eq!(
        query(GRID, &expression),
        r#"{"data":["1.0","1.1","1.2","2.0","2.1","2.2","3.0","3.1","3.2"],"errors":[]}"#
    );
}

#[test]
fn test_anchor_texts() {
    let expression = crlf(&["{", "    anchor `css(\"a\")` [", "        content `text()`", "    ]", "}"]);
    assert_eq!(
        query(PAGES, &expression),
        r#"{"data":{"anchor":["Page 1","Page 2","Page 3"]},"errors":[]}"#
    );
}

#[test]
fn test_anchor_objects() {
    let expression = crlf(&[
        "{",
        "    anchor `css(\"a\")` [",
        "        {",
        "            title `text()`",
        "        }",
        "    ]",
        "}",
    ]);
    assert_eq!(
        query(PAGES, &expression),
        r#"{"data":{"anchor":[{"title":"Page 1"},{"title":"Page 2"},{"title":"Page 3"}]},"errors":[]}"#
    );
}

#[test]
fn test_single_line_object_array() {
    assert_eq!(
        query(PAGES, "anchor `css(\"a\")` [{title `text()`;  url `attr(\"href\")`;}]"),
        r#"{"data":[{"title":"Page 1","url":"01.html"},{"title":"Page 2","url":"02.html"},{"title":"Page 3","url":"03.html"}],"errors":[]}"#
    );
}

#[test]
fn test_fragment_with_trailing_garbage() {
    let document = r#"<a href="1.html">anchor 1</a> <a href="2.html">anchor 2</a> <a href="3.html">anchor 3</a>"#;
    let expression = "a `css(\"a\")` [{ title `text();trim()` url  `attr(\"href\")` }]` }]";
    assert_eq!(
        query(document, expression),
        r#"{"data":[{"title":"anchor 1","url":"1.html"},{"title":"anchor 2","url":"2.html"},{"title":"anchor 3","url":"3.html"}],"errors":[]}"#
    );
}

#[test]
fn test_mixed_backends() {
    let expression = r#"{
        bookname `css("book title")`
        exname `regex("/<name>(.*?)</name>/w"); eq("3")`
        __JSON__ `regex("/var data = ([\s\S]*?)\s+</script>/w")`
        __firstname__ `link("__JSON__"); json("name.first")`
        author `link("__JSON__"); json("name.last"); template("{$__firstname__} {$}")`
        friends `link("__JSON__"); json("friends")` [{
            first `json("first")`
            last `json("last")`
            age `json("age")`
        }]
        character `xpath("//character")` [{
            name `css("name")`
            born `xpath("born")`
            qualification `regex("/qualification>(.*?)</w")`
        }]
    }"#;
    assert_eq!(
        query(LIBRARY, expression),
        concat!(
            r#"{"data":{"author":"Tom Anderson","bookname":"Being a Dog Is a Full-Time Job","#,
            r#""character":[{"born":"1966-08-22","name":"Peppermint Patty","qualification":"bold, brash and tomboyish"},"#,
            r#"{"born":"1950-10-04","name":"Snoopy","qualification":"extroverted beagle"}],"#,
            r#""exname":"Harry Poter","#,
            r#""friends":[{"age":"44","first":"Dale","last":"Murphy"},{"age":"68","first":"Roger","last":"Craig"},"#,
            r#"{"age":"47","first":"Jane","last":"Murphy"}]},"errors":[]}"#
        )
    );
}

#[test]
fn test_json_document() {
    let document = r#"{"store": {"books": [
        {"title": "Dune", "price": 9.5, "url": "/b/dune"},
        {"title": "Emma", "price": 4, "url": "/b/emma"}
    ]}}"#;
    let expression = r#"{
        __base__ `template("https://shop.example/")`
        books `json("store.books")` [{
            title `json("title")`
            price `json("price")`
            link `json("url"); absolute("{$__base__}")`
        }]
        count `json("store.books.#")`
    }"#;
    let response = parse_from_str(document, expression);
    assert_eq!(
        response.data,
        json!({
            "books": [
                {"link": "https://shop.example/b/dune", "price": "9.5", "title": "Dune"},
                {"link": "https://shop.example/b/emma", "price": "4", "title": "Emma"},
            ],
            "count": "2"
        })
    );
    assert!(response.is_ok());
}

// ============================================================================
// Compile Errors
// ============================================================================

#[test]
fn test_compile_error_message() {
    let error = compile("[{ title `text();trim()` url  `attr(\"href\")` }]").unwrap_err();
    assert_eq!(
        error.to_string(),
        "read_node: unexpected character \"[\", error found in #1 byte of ...|[{ title `t|..., bigger context ...|[{ title `text();trim()` url  `attr(\"href\")` }]|..."
    );
}

#[test]
fn test_compile_error_in_response() {
    let response = parse_from_str(PAGES, "{ a `css(\"a\")");
    assert_eq!(response.data, serde_json::Value::Null);
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].starts_with("compile error: read_pipelines: expected \"`\" character"));
    assert!(!response.is_ok());
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Deserialize, PartialEq)]
struct Anchor {
    title: String,
    url: String,
}

#[test]
fn test_response_decode() {
    let response = parse_from_str(PAGES, "anchor `css(\"a\")` [{ title `text()` url `attr(\"href\")` }]");
    let anchors: Vec<Anchor> = response.decode().unwrap();
    assert_eq!(anchors.len(), 3);
    assert_eq!(
        anchors[2],
        Anchor {
            title: "Page 3".to_string(),
            url: "03.html".to_string()
        }
    );

    let wrong: Result<Vec<u32>, _> = response.decode();
    assert!(wrong.is_err());
}

#[test]
fn test_response_marshal_data() {
    let response = parse_from_str(ARTICLE, "{ title `css(\".title\")` }");
    assert_eq!(response.marshal_data().unwrap(), r#"{"title":"Article"}"#);

    let failed = Response::failed("boom");
    assert_eq!(failed.marshal_data().unwrap_err().to_string(), "can not marshal null data");
    assert_eq!(
        failed.decode::<Vec<String>>().unwrap_err().to_string(),
        "can not decode null data"
    );
    assert_eq!(to_json(&failed), r#"{"data":null,"errors":["boom"]}"#);
}

#[test]
fn test_response_pretty() {
    let response = parse_from_str(ARTICLE, "title `css(\".title\")`");
    assert_eq!(
        to_json_pretty(&response),
        "{\n  \"data\": \"Article\",\n  \"errors\": []\n}"
    );
}

#[test]
fn test_response_round_trips_through_serde() {
    let response = parse_from_str(ITEMS, "{ t `css(\".title\"); eq(\"7\")` }");
    let decoded: Response = serde_json::from_str(&to_json(&response)).unwrap();
    assert_eq!(decoded, response);
    assert_eq!(decoded.errors, vec!["t: no element at index 7, selection has 3"]);
}

// ============================================================================
// Command Line
// ============================================================================

#[test]
fn test_check_syntax_only() {
    let options = CheckOptions {
        expression: "{a `text()`}".to_string(),
        syntax_only: true,
        ..Default::default()
    };
    match cli::execute_check(&options).unwrap() {
        CheckResult::SyntaxValid(normalised) => assert_eq!(normalised, "{\n    a `text()`\n}"),
        other => panic!("expected syntax result, got {:?}", other),
    }
}

#[test]
fn test_check_runs_input() {
    let options = CheckOptions {
        expression: "title `css(\".title\")`".to_string(),
        input: Some(ARTICLE.to_string()),
        ..Default::default()
    };
    match cli::execute_check(&options).unwrap() {
        CheckResult::Success(response) => assert_eq!(response.data, json!("Article")),
        other => panic!("expected a response, got {:?}", other),
    }
}

#[test]
fn test_check_reads_file() {
    let path = std::env::temp_dir().join(format!("graphquery-check-{}.html", std::process::id()));
    std::fs::write(&path, PAGES).unwrap();
    let options = CheckOptions {
        expression: "first `css(\"a\"); eq(\"0\"); attr(\"href\")`".to_string(),
        file: Some(path.clone()),
        ..Default::default()
    };
    let result = cli::execute_check(&options);
    std::fs::remove_file(&path).unwrap();
    match result.unwrap() {
        CheckResult::Success(response) => assert_eq!(response.data, json!("01.html")),
        other => panic!("expected a response, got {:?}", other),
    }
}

#[test]
fn test_check_errors() {
    let options = CheckOptions {
        expression: "a".to_string(),
        ..Default::default()
    };
    assert!(matches!(cli::execute_check(&options), Err(CliError::NoInput)));

    let options = CheckOptions {
        expression: "[".to_string(),
        input: Some(String::new()),
        ..Default::default()
    };
    assert!(matches!(cli::execute_check(&options), Err(CliError::Compile(_))));

    let options = CheckOptions {
        expression: "a".to_string(),
        file: Some("/nonexistent/graphquery/input.html".into()),
        ..Default::default()
    };
    assert!(matches!(cli::execute_check(&options), Err(CliError::Io(_))));
}

fn shout(selection: &SelectionRef, _args: &[String]) -> Result<SelectionRef, PipelineError> {
    Ok(graphquery::selection::TextSelection::shared(selection.raw().to_uppercase()))
}

#[test]
fn test_list_operations() {
    let listing = cli::list_operations(Registry::global());
    assert_eq!(listing.lines().count(), 13);
    assert!(listing.starts_with("  css(selector)"));
    assert!(listing.contains("replace(old, new)"));
    assert!(listing.contains("  trim()                   strip surrounding whitespace\n"));

    let mut registry = Registry::builtin();
    registry.register("shout", 2, shout).unwrap();
    let listing = cli::list_operations(&registry);
    assert!(listing.ends_with("  shout(arg, arg)\n"));
}
