use super::Selector;

/// Selectors describing the remote site's pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSelectors {
    pub login_user_id: Selector,
    pub login_password: Selector,
    pub login_submit: Selector,
    /// URL fragment reached after a successful login.
    pub login_success_url: String,

    pub keyword: Selector,
    pub use_date: Selector,
    pub search: Selector,
    pub loading: Selector,
    /// Rendered once search results have been drawn.
    pub results_marker: Selector,
    pub available_slot: Selector,

    pub lottery_slot: Selector,
    pub lottery_status: Selector,
    /// Status text shown for a slot this account already entered.
    pub awaiting_lottery_text: String,
    pub agreement: Selector,
    pub contact_phone: Selector,
    pub to_confirmation: Selector,
    pub submit_application: Selector,
    pub reservation_number: Selector,
    pub back_to_facilities: Selector,

    pub history_menu: Selector,
    pub history_rows: Selector,
    pub history_next_page: Selector,
    pub history_section: Selector,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            login_user_id: Selector::id("a11y-01"),
            login_password: Selector::id("a11y-02"),
            login_submit: Selector::css(r#"input[type="submit"][value="ログイン"]"#),
            login_success_url: "FRPC010G_LoginAction.do".to_string(),

            keyword: Selector::id("keyword"),
            use_date: Selector::id("useDateArea"),
            search: Selector::id("search"),
            loading: Selector::id("loading"),
            results_marker: Selector::class("status-area47"),
            available_slot: Selector::class("time-rsv-available-btn"),

            lottery_slot: Selector::class("time-rsv-lottery-btn"),
            lottery_status: Selector::class("status-area47"),
            awaiting_lottery_text: "抽選結果待ち".to_string(),
            agreement: Selector::id("agreement"),
            contact_phone: Selector::id("telNo"),
            to_confirmation: Selector::id("btnConfirm"),
            submit_application: Selector::id("btnApply"),
            reservation_number: Selector::class("rsv-number"),
            back_to_facilities: Selector::css(r#"a[href*="do_FacilityList"]"#),

            history_menu: Selector::css(r#"a[href*="do_ReserveInfoListGeneral"]"#),
            history_rows: Selector::css("table.striped01 > tbody > tr"),
            history_next_page: Selector::css(r#"a[href*="do_NextPage"]"#),
            history_section: Selector::css("section.view-list.first-child.last-child"),
        }
    }
}
