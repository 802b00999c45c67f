//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# sidedock configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[window]
# width = -1                # satellite width in px, -1 = 235 (50-4000)
# height = -1               # -1 = match the anchor (50-4000)
# popup = true              # create satellites without toolbars
# popup_hidden = true       # panel-type popup hidden from other extensions
# title_preface = ""

[docking]
# enabled = true
# space_between = -13       # gap between satellite and anchor (-500..500)
# dock_right = false
# horizontal_min_enabled = false
# horizontal_min = -8
# horizontal_max = -1       # -1 = no maximum
# slow_interval_ms = 1000   # negative disables polling (max 60000)
# fast_interval_ms = 25     # used while it is smaller than slow_interval_ms
# control_position = true
# minimize = true
# auto_close = true
# restore_state = true
# restore_state_only_last_window = true
# sync_width = true
# sync_height = true
# tile_height = false
# tile_height_margin = -8   # -200..200
# tile_width = true
# auto_focus = true
# refocus_parent = true

[startup]
# auto_open = false
# auto_detect = false
# session_data = true
# collaborator_timeout_ms = 30000   # 0-300000

[companion]
# page_url = "ext+treestyletab:tabbar"
# internal_scheme = "moz-extension"
# internal_page_path = "sidebar/sidebar.html"
# page_title = "Tabs"

[logging]
# level = "info"            # debug | info | warning | error
"##
    .to_string()
}
