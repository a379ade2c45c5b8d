use graphql_entitlements::GrantedEntitlements;
use graphql_entitlements::authorize;
use graphql_entitlements::extract_paths;
use pretty_assertions::assert_eq;
use rstest::rstest;

const LISTENER_QUERY: &str = include_str!("fixtures/listener-query.graphql");
const SET_PROGRESS_MUTATION: &str = include_str!("fixtures/set-progress-mutation.graphql");

const LISTENER_PATHS: [&str; 9] = [
    "query.listener.playback.current.sourceId",
    "query.listener.playback.current.index",
    "query.listener.playback.current.pandoraId",
    "query.listener.playback.current.artId",
    "query.listener.playback.current.audioUrl",
    "query.listener.playback.current.annotation.name",
    "query.listener.playback.current.annotation.Track.duration",
    "query.listener.playback.current.annotation.Track.artist.name",
    "query.listener.playback.current.annotation.Track.album.name",
];

#[test]
fn extracts_every_leaf_of_the_listener_query() {
    assert_eq!(extract_paths(LISTENER_QUERY).unwrap(), LISTENER_PATHS);
}

#[test]
fn extracts_mutation_paths() {
    assert_eq!(
        extract_paths(SET_PROGRESS_MUTATION).unwrap(),
        vec!["mutation.listener.playback.setProgress._"]
    );
    assert_eq!(
        authorize(SET_PROGRESS_MUTATION, Vec::<String>::new()).unwrap(),
        vec!["mutation.listener.playback.setProgress._"]
    );
}

#[rstest]
#[case::double_wildcard_at_top_level(&["**"])]
#[case::double_wildcard_one_level_deep(&["query.listener.**"])]
#[case::exact_paths_and_wildcards(&[
    "query.listener.playback.current.*",
    "query.listener.playback.current.annotation.**",
])]
fn fully_authorized(#[case] granted: &[&str]) {
    assert_eq!(authorize(LISTENER_QUERY, granted).unwrap(), Vec::<String>::new());
}

#[rstest]
#[case::no_entitlements(&[])]
#[case::wrong_parent(&["query.stations.**"])]
#[case::single_wildcard_at_top_level(&["*"])]
#[case::single_wildcard_without_operation(&["listener.*"])]
#[case::mutation_entitlements(&["mutation.**"])]
fn nothing_authorized(#[case] granted: &[&str]) {
    assert_eq!(authorize(LISTENER_QUERY, granted).unwrap(), LISTENER_PATHS);
}

#[test]
fn single_wildcards_match_one_segment_each() {
    assert_eq!(
        authorize(LISTENER_QUERY, ["query.listener.*.*.*"]).unwrap(),
        vec![
            "query.listener.playback.current.annotation.name",
            "query.listener.playback.current.annotation.Track.duration",
            "query.listener.playback.current.annotation.Track.artist.name",
            "query.listener.playback.current.annotation.Track.album.name",
        ]
    );
}

#[test]
fn entitlement_lists_are_split() {
    let granted = "query.listener.playback.current.*, query.listener.playback.current.annotation.Track.**;\nquery.listener.playback.current.annotation.name";
    assert_eq!(authorize(LISTENER_QUERY, granted).unwrap(), Vec::<String>::new());

    let granted = GrantedEntitlements::parse("query.listener.playback.current.*");
    assert_eq!(authorize(LISTENER_QUERY, granted).unwrap().len(), 4);
}

#[test]
fn no_entitlements_leave_the_extracted_paths() {
    for request in [LISTENER_QUERY, SET_PROGRESS_MUTATION, "{ a { b } c }"] {
        assert_eq!(
            authorize(request, GrantedEntitlements::default()).unwrap(),
            extract_paths(request).unwrap()
        );
        assert!(authorize(request, ["**"]).unwrap().is_empty());
    }
}

#[rstest]
#[case::unclosed_query("{")]
#[case::empty_selection_set("{}")]
#[case::empty_string("")]
#[case::blank_string("  \n")]
fn syntax_errors(#[case] request: &str) {
    let error = authorize(request, ["**"]).unwrap_err();
    assert!(!error.errors.is_empty());
    assert!(error.to_string().starts_with("Syntax Error: "), "{error}");
}

#[test]
fn empty_string_message() {
    let error = authorize("", GrantedEntitlements::default()).unwrap_err();
    assert_eq!(error.to_string(), "Syntax Error: Null or empty string");
}
